//! Sample featurable entities.

use featuregate_domain::Featurable;

/// Application user keyed by a numeric id.
#[derive(Debug, Clone)]
pub struct User {
    pub id: u64,
}

impl User {
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}

impl Featurable for User {
    fn featurable_type(&self) -> &str {
        "user"
    }

    fn featurable_id(&self) -> String {
        self.id.to_string()
    }
}

/// Organisation keyed by a slug. Shares id space with nothing.
#[derive(Debug, Clone)]
pub struct Organisation {
    pub slug: &'static str,
}

impl Featurable for Organisation {
    fn featurable_type(&self) -> &str {
        "organisation"
    }

    fn featurable_id(&self) -> String {
        self.slug.to_string()
    }
}
