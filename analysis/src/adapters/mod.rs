//! One adapter per supported analysis tool.

pub mod checkstyle;
pub mod pmd;
pub mod sonar;
pub mod spotbugs;

pub use checkstyle::CheckstyleAdapter;
pub use pmd::PmdAdapter;
pub use sonar::SonarScannerAdapter;
pub use spotbugs::SpotBugsAdapter;
