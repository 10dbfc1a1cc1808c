//! StarRocks fixtures for the sort end-to-end tests
//!
//! - [`build_starrocks_image`] derives `inlong-starrocks:latest` from the
//!   all-in-one image by adding the FE/BE startup script.
//! - [`StarRocksContainer`] runs the derived image.
//! - [`initialize_starrocks_table`] creates the sink table the tests write to.

mod container;
mod error;
mod image;
mod schema;

pub use container::{
    StarRocksContainer, BE_HTTP_PORT, DEFAULT_CONTAINER_NAME, FE_HTTP_PORT, FE_QUERY_PORT,
    INTER_CONTAINER_STAR_ROCKS_ALIAS,
};
pub use error::{Result, StarRocksError};
pub use image::{
    build_starrocks_image, find_startup_script, new_starrocks_image, new_starrocks_image_name,
    NEW_STARROCKS_REPOSITORY, NEW_STARROCKS_TAG, STARTUP_SCRIPT_PATH, STAR_ROCKS_IMAGE_NAME,
};
pub use schema::{initialize_starrocks_table, CREATE_TEST_OUTPUT_TABLE, TEST_OUTPUT_TABLE};
