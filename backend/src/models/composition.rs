use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionBucket {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionResponse {
    pub geography: Vec<CompositionBucket>,
    pub market_cap: Vec<CompositionBucket>,
}

impl CompositionResponse {
    pub fn geography_weight(&self, name: &str) -> Option<f64> {
        self.geography.iter().find(|b| b.name == name).map(|b| b.value)
    }

    pub fn market_cap_weight(&self, name: &str) -> Option<f64> {
        self.market_cap.iter().find(|b| b.name == name).map(|b| b.value)
    }
}
