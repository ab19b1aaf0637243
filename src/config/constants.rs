pub const DEFAULT_GROUP: &str = "General";
pub const CONF_SUFFIX: &str = ".conf";

pub const BANNER_WIDTH: usize = 80;
pub const WRAP_WIDTH: usize = 78;
pub const BANNER_SEPARATOR: char = '#';
pub const INDENT: &str = "    ";
