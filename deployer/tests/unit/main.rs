//! Unit test suite

mod test_workflow;
