//! Program catalogue offered on the enrollment form

/// Program preselected on a fresh form
pub const DEFAULT_PROGRAM: &str = "Sistemas de Informação";

/// Every program a participant may enroll in, in display order
pub const PROGRAMS: &[&str] = &[
    "Sistemas de Informação",
    "Pedagogia",
    "Direito",
    "Hotelaria",
    "Ciências Contáveis",
    "Gastronomia",
    "Ontopsicologia",
    "Administração",
];

/// Whether `name` is one of the offered programs (exact match)
pub fn is_known_program(name: &str) -> bool {
    PROGRAMS.contains(&name)
}
