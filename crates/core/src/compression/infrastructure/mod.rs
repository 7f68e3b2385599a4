pub mod optipng_compressor;
