mod support;

mod recurring_tests;
