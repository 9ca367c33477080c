#![allow(dead_code)]

use apu_core::project::{BankItem, BudgetItem, Project, ResourceKind, ResourceLine};

pub fn line(desc: &str, unit: &str, qty: f64, price: f64) -> ResourceLine {
    ResourceLine::new(desc, unit, qty, price)
}

pub fn item(id: u64, module_id: &str, quantity: f64, materials: Vec<ResourceLine>) -> BudgetItem {
    BudgetItem::new(id, format!("Item {id}"), "m3", quantity, module_id)
        .with_lines(ResourceKind::Materials, materials)
}

/// Two items in the default module sharing cement at different prices,
/// plus one bank template.
pub fn sample_project() -> Project {
    let mut project = Project::new();
    let module = project.current_module_id();
    project.items = vec![
        item(
            101,
            &module,
            10.0,
            vec![line("Cemento portland", "kg", 1.0, 1.26), line("Arena fina", "m3", 0.05, 150.0)],
        )
        .with_lines(ResourceKind::Labor, vec![line("Albañil", "hr", 0.5, 20.0)]),
        item(102, &module, 5.0, vec![line("cemento portland", "kg", 2.0, 1.40)]),
    ];
    project.bank = vec![BankItem::new(201, 1, "Contrapiso", "m2").with_lines(
        ResourceKind::Materials,
        vec![line("Cemento portland", "kg", 8.0, 1.10)],
    )];
    project
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
