//! Scheduler tests: policies, quantum accounting, and the swap protocol.

mod swap;
