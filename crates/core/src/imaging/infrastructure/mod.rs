pub mod image_file_decoder;
pub mod image_file_encoder;
