//! Fixed category lists per transaction kind.
//!
//! The hosted database does not constrain `categoria`; the UI and the
//! assistant tool schemas are the only enforcement, so these lists are the
//! single source of truth on the server side.

/// Valid expense categories.
pub const GASTO_CATEGORIES: [&str; 8] = [
    "Alimentación",
    "Transporte",
    "Vivienda",
    "Salud",
    "Entretenimiento",
    "Educación",
    "Ahorro/inversión",
    "Otros gastos",
];

/// Valid income categories.
pub const INGRESO_CATEGORIES: [&str; 5] = [
    "Salario",
    "Ventas",
    "Servicios",
    "Inversiones",
    "Otros ingresos",
];

/// Category used for savings-goal aportes and retiros.
pub const SAVINGS_CATEGORY: &str = "Ahorro/inversión";

/// Category assigned to materialized recurring charges.
pub const RECURRING_CATEGORY: &str = "Suscripciones";

/// Fallback category for imported rows with none set.
pub const IMPORT_FALLBACK_CATEGORY: &str = "Otros";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savings_category_is_a_gasto_category() {
        assert!(GASTO_CATEGORIES.contains(&SAVINGS_CATEGORY));
    }

    #[test]
    fn special_categories_stay_out_of_the_tool_lists() {
        assert!(!GASTO_CATEGORIES.contains(&RECURRING_CATEGORY));
        assert!(!GASTO_CATEGORIES.contains(&IMPORT_FALLBACK_CATEGORY));
        assert!(!INGRESO_CATEGORIES.contains(&IMPORT_FALLBACK_CATEGORY));
    }
}
