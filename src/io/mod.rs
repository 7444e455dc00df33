pub mod id_map;
pub mod mask_io;
pub mod stack;
pub mod tables;
