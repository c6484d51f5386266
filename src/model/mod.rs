pub mod task;
pub mod work_item;
