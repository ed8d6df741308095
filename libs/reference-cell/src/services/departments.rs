use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::ClinicDatabase;
use shared_models::entities::Department;

use crate::models::{CreateDepartmentRequest, ReferenceError, UpdateDepartmentRequest};

pub struct DepartmentService {
    db: ClinicDatabase,
}

impl DepartmentService {
    pub fn new(db: ClinicDatabase) -> Self {
        Self { db }
    }

    pub async fn create_department(
        &self,
        request: CreateDepartmentRequest,
    ) -> Result<Department, ReferenceError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(ReferenceError::ValidationError(
                "Department name must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let department = Department {
            id: Uuid::new_v4(),
            name,
            head_name: request.head_name,
            location: request.location,
            phone: request.phone,
            description: request.description,
            created_at: now,
            updated_at: now,
        };

        let department = self.db.insert_department(department).await?;
        info!("Department {} created: {}", department.id, department.name);
        Ok(department)
    }

    pub async fn get_department(&self, id: Uuid) -> Result<Department, ReferenceError> {
        Ok(self.db.get_department(id).await?)
    }

    pub async fn list_departments(&self) -> Vec<Department> {
        self.db.list_departments().await
    }

    pub async fn update_department(
        &self,
        id: Uuid,
        request: UpdateDepartmentRequest,
    ) -> Result<Department, ReferenceError> {
        debug!("Updating department {}", id);
        let mut department = self.db.get_department(id).await?;

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ReferenceError::ValidationError(
                    "Department name must not be empty".to_string(),
                ));
            }
            department.name = name;
        }
        if let Some(head_name) = request.head_name {
            department.head_name = Some(head_name);
        }
        if let Some(location) = request.location {
            department.location = Some(location);
        }
        if let Some(phone) = request.phone {
            department.phone = Some(phone);
        }
        if let Some(description) = request.description {
            department.description = Some(description);
        }
        department.updated_at = Utc::now();

        Ok(self.db.update_department(department).await?)
    }

    /// Restricted while doctors are assigned to the department.
    pub async fn delete_department(&self, id: Uuid) -> Result<(), ReferenceError> {
        self.db.delete_department(id).await?;
        info!("Department {} deleted", id);
        Ok(())
    }
}
