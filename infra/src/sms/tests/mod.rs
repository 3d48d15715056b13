//! Tests for SMS delivery

mod dispatcher_tests;
