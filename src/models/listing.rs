use chrono::NaiveDate;

/// Fields pulled out of one posting by an adapter, before normalization.
/// Every field is optional because markup drifts between site redesigns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawListing {
    pub id: Option<String>,
    pub role: Option<String>,
    pub url: Option<String>,
    pub location: Option<String>,
    pub department: Option<String>,
    pub published_at: Option<String>,
}

/// A posting accepted into the working set.
///
/// `id` is `"<site>:<source_id>"` and unique within a run; `role` and `url`
/// are never empty. `description` stays `None` until the description stage.
#[derive(Debug, Clone, PartialEq)]
pub struct JobListing {
    pub id: String,
    pub site: String,
    pub source_id: String,
    pub role: String,
    pub url: String,
    pub location: String,
    pub department: Option<String>,
    pub published_at: Option<NaiveDate>,
    pub description: Option<String>,
}

impl JobListing {
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}
