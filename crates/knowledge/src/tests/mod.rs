//! End-to-end pipeline tests with in-process fakes.

mod pipeline;
