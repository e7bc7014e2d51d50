pub mod alphavantage;
pub mod market_data_provider;
pub mod multi_provider;
pub mod synthetic;
pub mod yahoo;
