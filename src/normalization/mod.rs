pub mod digits;
pub mod slug;
