//! Test placement: where the generated test goes, and writing it there.

pub mod resolver;
pub mod writer;

pub use resolver::{
    test_file_name, test_source_set, PathResolver, TestFileTarget, DEFAULT_TEST_SOURCE_SET,
    GENERATED_DIR, SOURCE_SET_TAGS,
};
pub use writer::TestFileWriter;
