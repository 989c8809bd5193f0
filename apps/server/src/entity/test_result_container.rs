//! Test result container entity for SeaORM.
//!
//! One row per container. Nested `TestClasses` are rows of the same table
//! pointing at their parent through `parent_id`, ordered by `position`.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_result_containers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub position: i32,
    pub identifier: String,
    pub short_identifier: Option<String>,
    pub pcap_storage_id: Option<Uuid>,
    pub keylogfile_storage_id: Option<Uuid>,
    pub date: Option<DateTimeUtc>,
    pub display_name: Option<String>,
    pub elapsed_time: Option<f64>,
    pub failed_tests: i32,
    pub succeeded_tests: i32,
    pub disabled_tests: i32,
    pub security_reached: i32,
    pub security_total: i32,
    pub security_percentage: f64,
    pub interoperability_reached: i32,
    pub interoperability_total: i32,
    pub interoperability_percentage: f64,
    /// Ordered array of test result ids (weak references).
    #[sea_orm(column_type = "JsonBinary")]
    pub test_results: JsonValue,
    /// Object mapping "Class.method" to an index into `test_results`.
    #[sea_orm(column_type = "JsonBinary")]
    pub test_result_class_method_index_map: JsonValue,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
}

impl ActiveModelBehavior for ActiveModel {}
