// Raffle session orchestration on top of sorteo-core.

pub mod demo;
pub mod session;
