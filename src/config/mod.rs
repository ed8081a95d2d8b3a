pub mod setting;
pub mod utils;

pub use setting::Settings;
pub use utils::get_config_dir;
pub use utils::get_data_dir;
pub use utils::get_setting_path;
