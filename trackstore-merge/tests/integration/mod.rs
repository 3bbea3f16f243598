mod common;
mod failure_test;
mod measurement_test;
mod merge_test;
mod reference_test;
