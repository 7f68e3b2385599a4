pub mod crop_engine;
