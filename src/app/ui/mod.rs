mod controls;
mod details;
