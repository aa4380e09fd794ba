pub mod test_harness;

#[cfg(test)]
mod test_scenarios;
