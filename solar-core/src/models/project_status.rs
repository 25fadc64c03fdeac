use serde::{Deserialize, Serialize};

/// Sales pipeline stage of a client's project.
///
/// Stages are bookkeeping only; they carry no calculation semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Lead,
    ProposalSent,
    ProposalAccepted,
    Approval,
    Installation,
    Completed,
}

impl ProjectStatus {
    /// Every stage in pipeline order.
    pub const ALL: [ProjectStatus; 6] = [
        Self::Lead,
        Self::ProposalSent,
        Self::ProposalAccepted,
        Self::Approval,
        Self::Installation,
        Self::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::ProposalSent => "proposal_sent",
            Self::ProposalAccepted => "proposal_accepted",
            Self::Approval => "approval",
            Self::Installation => "installation",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Zero-based position in the pipeline.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The following stage, or `None` once completed.
    pub fn next(&self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Lead => "Novo / Análise",
            Self::ProposalSent => "Proposta Enviada",
            Self::ProposalAccepted => "Proposta Aceita",
            Self::Approval => "Homologação",
            Self::Installation => "Instalação",
            Self::Completed => "Concluído",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Lead => "Cliente cadastrado, coletando dados.",
            Self::ProposalSent => "Proposta apresentada ao cliente.",
            Self::ProposalAccepted => "Cliente aceitou, contrato assinado.",
            Self::Approval => "Solicitação de acesso na concessionária.",
            Self::Installation => "Equipe em campo instalando o sistema.",
            Self::Completed => "Sistema ativo e gerando economia.",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn pipeline_order_follows_sales_flow() {
        assert_eq!(ProjectStatus::Lead.next(), Some(ProjectStatus::ProposalSent));
        assert_eq!(ProjectStatus::Installation.next(), Some(ProjectStatus::Completed));
        assert_eq!(ProjectStatus::Completed.next(), None);
        assert!(ProjectStatus::Approval > ProjectStatus::ProposalAccepted);
    }

    #[test]
    fn parse_matches_stored_names() {
        for status in ProjectStatus::ALL {
            assert_eq!(ProjectStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProjectStatus::parse("archived"), None);
    }

    #[test]
    fn serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&ProjectStatus::ProposalAccepted).unwrap(),
            "\"proposal_accepted\""
        );
    }
}
