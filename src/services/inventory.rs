use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Equipment, NewEquipment, NewStudent, Student};
use crate::store::LoanStore;

fn require(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

pub async fn register_student(store: &dyn LoanStore, data: NewStudent) -> Result<Student> {
    let data = NewStudent {
        name: require("Name", &data.name)?,
        roll_no: require("Roll number", &data.roll_no)?,
        class_name: require("Class", &data.class_name)?,
        phone: require("Phone", &data.phone)?,
    };

    let student = store.create_student(&data).await?;
    tracing::info!(student_id = %student.id, name = %student.name, "Student registered");

    Ok(student)
}

pub async fn list_students(store: &dyn LoanStore) -> Result<Vec<Student>> {
    store.list_students().await
}

/// Deletes a student that has never borrowed anything
pub async fn remove_student(store: &dyn LoanStore, id: Uuid) -> Result<()> {
    store.delete_student(id).await?;
    tracing::info!(student_id = %id, "Student deleted");

    Ok(())
}

pub async fn register_equipment(store: &dyn LoanStore, data: NewEquipment) -> Result<Equipment> {
    if data.quantity < 0 {
        return Err(AppError::Validation(
            "Quantity cannot be negative".to_string(),
        ));
    }
    let data = NewEquipment {
        name: require("Name", &data.name)?,
        quantity: data.quantity,
    };

    let equipment = store.create_equipment(&data).await?;
    tracing::info!(
        equipment_id = %equipment.id,
        name = %equipment.name,
        quantity = equipment.quantity,
        "Equipment registered"
    );

    Ok(equipment)
}

pub async fn list_equipments(store: &dyn LoanStore) -> Result<Vec<Equipment>> {
    store.list_equipments().await
}

/// Deletes an equipment that has no loan currently out
pub async fn remove_equipment(store: &dyn LoanStore, id: Uuid) -> Result<()> {
    store.delete_equipment(id).await?;
    tracing::info!(equipment_id = %id, "Equipment deleted");

    Ok(())
}
