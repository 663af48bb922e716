//! Scenario tests for the load queue, driven by the simulated host
