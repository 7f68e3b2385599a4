/// Extensions gathered from the input directory when none are given.
pub const DEFAULT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Extensions the `image` crate can both decode and write back in place.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"];

/// Optimization flags passed to optipng (max level, full zlib memory sweep,
/// strip metadata, no bit-depth reduction, overwrite in place).
pub const OPTIPNG_ARGS: &[&str] = &["-o7", "-zm1-9", "-strip", "all", "-nb", "-clobber", "-quiet"];
