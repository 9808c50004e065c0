use serde::{Deserialize, Serialize};

/// Guidance sent to the equipment team when training equipment is still on loan.
/// The text is shared with the caseworkers' follow-up procedure and must stay verbatim.
pub const LOAN_FOLLOW_UP_BODY: &str = concat!(
    "\"I forbindelse med afslutning af borgerens træningsforløb, er det konstateret, at der fortsat er aktive udlån af træningsredskaber fra Hjælpemiddelservice. \n",
    "                                        I bedes derfor følge op på disse udlån i forhold til følgende muligheder:\n",
    "                                        \n",
    "                                        •\tBestil hjemtagning i Nexus (efter forudgående aftale med borger)\n",
    "                                        •\tKontakt Myndighed for forespørgsel om overflytning til SEL § 112 – varig bevilling\n",
    "                                        •\tBestil hjemtagning af de redskaber, som Myndighed ikke kan bevilge.\n",
    "                                        •\tKontakt Hjælpemiddelservice, hvis der er tale om hjælpemidler, der foreslås kasseret (f.eks. ikke genbrugelige kiler)",
);

/// Paths, names and organizations the discharge rules are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DischargePolicy {
    pub out_of_town_path: String,
    pub basket_grant_path: String,
    pub form_path: String,
    pub course_placement_path: String,
    /// Form kept active on every discharge.
    pub excluded_form: String,
    pub end_note_form: String,
    pub ggop_provider: String,
    pub rehabilitation_teams: Vec<String>,
    pub training_equipment_grants: Vec<String>,
    pub loan_follow_up_task: String,
    pub loan_follow_up_organization: String,
    pub collaboration_task: String,
    pub authority_organization: String,
    pub collaboration_due_days: i64,
    pub process_name: String,
}

impl DischargePolicy {
    pub fn standard() -> Self {
        Self {
            out_of_town_path: "/Sundhedsfagligt grundforløb/FSIII/Indsatser/Genoptræning udenbys borger (SUL § 140)".to_string(),
            basket_grant_path: "/Sundhedsfagligt grundforløb/FSIII/Indsatser/basketGrantReference".to_string(),
            form_path: "/Sundhedsfagligt grundforløb/FSIII/formDataV2Reference".to_string(),
            course_placement_path: "/ÆHF - Forløbsindplacering (Grundforløb)/Forløbsindplacering/Indsatser/basketGrantReference".to_string(),
            excluded_form: "Generelle oplysninger".to_string(),
            end_note_form: "Slutnotat træning".to_string(),
            ggop_provider: "GGOP til anden kommune".to_string(),
            rehabilitation_teams: vec![
                "Genoptræning Team Nord".to_string(),
                "Genoptræning Team Syd".to_string(),
                "Genoptræning Team Odense".to_string(),
                "Rehabilitering og palliation".to_string(),
            ],
            training_equipment_grants: vec![
                "SEL § 86 Træning Hjælpemidler".to_string(),
                "SUL § 140 Træning Hjælpemidler".to_string(),
                "ÆL § 9 Træning Hjælpemidler".to_string(),
            ],
            loan_follow_up_task: "Opfølgning på udlån af træningsredskab".to_string(),
            loan_follow_up_organization: "Rehabilitering og palliation".to_string(),
            collaboration_task: "Tværfagligt samarbejde".to_string(),
            authority_organization: "Myndighed genoptræning".to_string(),
            collaboration_due_days: 7,
            process_name: "Afslutning af borgere i genoptræning".to_string(),
        }
    }

    pub fn is_training_equipment_grant(&self, grant: Option<&str>) -> bool {
        grant.is_some_and(|name| self.training_equipment_grants.iter().any(|known| known == name))
    }

    pub fn collaboration_description(&self, provider: &str) -> String {
        format!("Opgave oprettet på vegne af: {provider}")
    }
}

impl Default for DischargePolicy {
    fn default() -> Self {
        Self::standard()
    }
}
