//! Runtime system
//!
//! This module contains the cooperative task scheduler.

pub mod scheduler;
