//! Building a sample.
//!
//! A run reads the `VERSION` manifest, validates the platform's install plan,
//! installs each dependency in plan order, and finally configures and
//! compiles the sample with CMake:
//!
//! ```text
//! <build>/<sample>$ cmake <base>/<sample>/<platform> -DCMAKE_BUILD_TYPE=... -DBOOST_ROOT=... ...
//! <build>/<sample>$ cmake --build . -j<cpus> --config <cfg>
//! ```

mod cmake;
mod paths;
mod pipeline;

pub use cmake::{BuildConfiguration, CMakeInvocation};
pub use paths::ResolvedPaths;
pub use pipeline::{BuildRequest, run_build, run_with};
