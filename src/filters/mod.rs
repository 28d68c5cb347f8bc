pub mod asciihex;
pub mod ccitt;
pub mod png;
pub mod runlength;
pub mod tiff;
