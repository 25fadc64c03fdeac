use serde::{Deserialize, Serialize};

pub const DEFAULT_COMPANY_NAME: &str = "SolarCalc Pro";

/// Branding printed on proposals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySettings {
    /// Base64-encoded logo image.
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

impl CompanySettings {
    /// Company name to print, falling back to the product name.
    pub fn display_name(&self) -> &str {
        self.company_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_COMPANY_NAME)
    }
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            logo: None,
            company_name: Some(DEFAULT_COMPANY_NAME.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_company_name_falls_back_to_default() {
        let settings = CompanySettings {
            logo: None,
            company_name: Some("   ".to_string()),
        };

        assert_eq!(settings.display_name(), DEFAULT_COMPANY_NAME);
    }

    #[test]
    fn missing_fields_deserialize_as_none() {
        let settings: CompanySettings = serde_json::from_str("{}").unwrap();

        assert_eq!(settings.logo, None);
        assert_eq!(settings.company_name, None);
        assert_eq!(settings.display_name(), DEFAULT_COMPANY_NAME);
    }
}
