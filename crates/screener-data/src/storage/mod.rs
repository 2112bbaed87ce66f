//! PostgreSQL 저장소 모듈.

pub mod db;
pub mod indicators;
pub mod prices;
pub mod tickers;
