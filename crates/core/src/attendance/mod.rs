pub mod attendance_engine;
pub mod attendance_record;
pub mod take_attendance_use_case;
