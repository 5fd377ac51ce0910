use serde::{Deserialize, Serialize};

/// Search surface and CSS selectors of the job board.
///
/// Defaults target the LinkedIn jobs pages. Every selector the engine and
/// the form filler use lives here so a layout change is a config change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    pub search_url: String,
    pub search_input: String,
    pub job_card: String,
    pub card_title: String,
    pub card_company: String,
    pub apply_button: String,
    pub continue_button: String,
    pub submit_button: String,
    pub next_page: String,
    pub form_fields: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            search_url: "https://www.linkedin.com/jobs/".to_string(),
            search_input: r#"input[role="combobox"]"#.to_string(),
            job_card: ".job-card-container".to_string(),
            card_title: "h3".to_string(),
            card_company: ".job-card-container__company-name".to_string(),
            apply_button: ".jobs-apply-button".to_string(),
            continue_button: r#"button[aria-label="Continue to next step"]"#.to_string(),
            submit_button: r#"button[aria-label="Submit application"]"#.to_string(),
            next_page: r#"button[aria-label="Next"]"#.to_string(),
            form_fields: "input, select, textarea".to_string(),
        }
    }
}
