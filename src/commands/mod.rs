pub mod new;
pub mod next;
pub mod show;
pub mod upcoming;
