pub mod stream;
pub mod decompress;
pub mod macroman;
pub mod catalog;
pub mod fork;
pub mod apple_single;
pub mod archive;
pub mod image;
pub mod quickdraw;
pub mod clut;
pub mod strlist;
pub mod sound;
pub mod picture;
pub mod icon;
pub mod convert;
