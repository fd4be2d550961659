//! Bitbackup Core
//!
//! Core types shared by the Bitbackup client and runner crates.
//!
//! This crate contains:
//! - Domain types: repositories, clone endpoints, job outcomes and run summaries
//! - DTOs: wire shapes returned by the source-control provider API

pub mod domain;
pub mod dto;
