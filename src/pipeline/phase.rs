use super::state::PhaseName;

pub struct PhaseDefinition {
    pub name: PhaseName,
    pub display_name: &'static str,
    pub description: &'static str,
}

pub static PHASES: &[PhaseDefinition] = &[
    PhaseDefinition {
        name: PhaseName::Enumerate,
        display_name: "Enumeration",
        description: "Passive subdomain discovery under the root domain",
    },
    PhaseDefinition {
        name: PhaseName::DnsValidate,
        display_name: "DNS Validation",
        description: "Chunked CNAME chain walking down to address records",
    },
    PhaseDefinition {
        name: PhaseName::WildcardFilter,
        display_name: "Wildcard Filter",
        description: "Exclusion of candidates under catch-all zones",
    },
    PhaseDefinition {
        name: PhaseName::CnameBlacklistFilter,
        display_name: "CNAME Blacklist",
        description: "Exclusion of chains touching verification, internal or mail records",
    },
    PhaseDefinition {
        name: PhaseName::ProviderIdentify,
        display_name: "Provider Identification",
        description: "Attribution to hosting providers by CNAME suffix and IP range",
    },
    PhaseDefinition {
        name: PhaseName::HttpValidate,
        display_name: "HTTP Validation",
        description: "Bulk HTTP probing of provider-hosted candidates",
    },
    PhaseDefinition {
        name: PhaseName::Classify,
        display_name: "Classification",
        description: "Priority-ordered evidence rules producing final verdicts",
    },
];

pub fn display_name(phase: PhaseName) -> &'static str {
    PHASES
        .iter()
        .find(|p| p.name == phase)
        .map(|p| p.display_name)
        .unwrap_or("Done")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_are_in_pipeline_order() {
        let names: Vec<PhaseName> = PHASES.iter().map(|p| p.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 7);
        assert!(!names.contains(&PhaseName::Done));
    }
}
