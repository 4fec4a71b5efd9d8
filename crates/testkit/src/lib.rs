mod contract;
mod yaml_runner;

pub use contract::{
    CheckResult, check_absent_kinds_are_empty, check_primary_keys, check_quote_round_trip,
    check_select_one, check_tables_exclude_information_schema, check_truncation_law,
    run_contract_checks,
};
pub use yaml_runner::{
    CONTRACT_CASES_YAML, Expectation, TestCase, TestResult, load_contract_cases,
    load_test_cases_from_str, matches_flavor, run_test, run_test_cases,
};
