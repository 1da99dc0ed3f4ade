pub mod admins;
pub mod announcements;
pub mod backup;
pub mod core;
pub mod exams;
pub mod results;
pub mod students;
pub mod subjects;
