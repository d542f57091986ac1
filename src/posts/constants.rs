//! Constants shared across the posts module

/// Jekyll layout assigned to generated posts
pub const POST_LAYOUT: &str = "post";

/// Format of the `date` front matter field
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Format of the file name prefix
pub const FILE_DATE_FORMAT: &str = "%Y-%m-%d";
