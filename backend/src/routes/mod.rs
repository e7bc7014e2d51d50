pub(crate) mod analytics;
pub(crate) mod health;
