use crate::catalog::Catalog;
use crate::types::{ColumnType, PolymorphicReference, TableDefinition, TableKind};

const CREATED_DATE: &str = "created_date";
const PARENT_COLUMN: &str = "source_id";

/// Returns the catalog of the maritime track store schema.
pub fn standard_catalog() -> Catalog {
    let mut tables = reference_tables();
    tables.extend(metadata_tables());
    tables.extend(measurement_tables());

    let polymorphic_references = vec![
        PolymorphicReference::new("Synonyms", "table", "entity"),
        PolymorphicReference::new("Logs", "table", "id"),
    ];

    Catalog {
        tables,
        polymorphic_references,
    }
}

fn reference(name: &str, primary_key: &str, key: &str) -> TableDefinition {
    TableDefinition::new(name, TableKind::Reference, primary_key)
        .with_column(key, ColumnType::String)
        .with_nullable_column(CREATED_DATE, ColumnType::Timestamp)
        .with_natural_key([key])
}

fn reference_tables() -> Vec<TableDefinition> {
    vec![
        reference("PlatformTypes", "platform_type_id", "name"),
        reference("Nationalities", "nationality_id", "name")
            .with_nullable_column("priority", ColumnType::I32),
        reference("GeometryTypes", "geo_type_id", "name"),
        reference("GeometrySubTypes", "geo_sub_type_id", "name")
            .with_foreign_key("parent", "GeometryTypes")
            .with_natural_key(["name", "parent"]),
        reference("Users", "user_id", "name"),
        reference("UnitTypes", "unit_type_id", "name"),
        reference("ClassificationTypes", "class_type_id", "class_type"),
        reference("ContactTypes", "contact_type_id", "contact_type"),
        reference("SensorTypes", "sensor_type_id", "name"),
        reference("Privacies", "privacy_id", "name")
            .with_nullable_column("level", ColumnType::I32),
        reference("DatafileTypes", "datafile_type_id", "name"),
        reference("MediaTypes", "media_type_id", "name"),
        reference("CommentTypes", "comment_type_id", "name"),
        reference("CommodityTypes", "commodity_type_id", "name"),
        reference("ConfidenceLevels", "confidence_level_id", "level"),
        reference("HelpTexts", "help_text_id", "id")
            .with_column("guidance", ColumnType::String),
    ]
}

fn metadata_tables() -> Vec<TableDefinition> {
    vec![
        TableDefinition::new("Platforms", TableKind::Metadata, "platform_id")
            .with_column("name", ColumnType::String)
            .with_nullable_column("pennant", ColumnType::String)
            .with_nullable_column("trigraph", ColumnType::String)
            .with_nullable_column("quadgraph", ColumnType::String)
            .with_foreign_key("nationality_id", "Nationalities")
            .with_foreign_key("platform_type_id", "PlatformTypes")
            .with_foreign_key("privacy_id", "Privacies")
            .with_nullable_column(CREATED_DATE, ColumnType::Timestamp),
        TableDefinition::new("Sensors", TableKind::Metadata, "sensor_id")
            .with_column("name", ColumnType::String)
            .with_foreign_key("sensor_type_id", "SensorTypes")
            .with_foreign_key("host", "Platforms")
            .with_foreign_key("privacy_id", "Privacies")
            .with_nullable_column(CREATED_DATE, ColumnType::Timestamp)
            .with_unique_constraint(["name", "host"]),
        TableDefinition::new("Datafiles", TableKind::Metadata, "datafile_id")
            .with_nullable_column("simulated", ColumnType::Bool)
            .with_foreign_key("privacy_id", "Privacies")
            .with_foreign_key("datafile_type_id", "DatafileTypes")
            .with_nullable_column("reference", ColumnType::String)
            .with_nullable_column("url", ColumnType::String)
            .with_column("size", ColumnType::I64)
            .with_column("hash", ColumnType::String)
            .with_nullable_column(CREATED_DATE, ColumnType::Timestamp)
            .with_unique_constraint(["size", "hash"]),
        TableDefinition::new("Synonyms", TableKind::Metadata, "synonym_id")
            .with_column("table", ColumnType::String)
            .with_column("entity", ColumnType::Uuid)
            .with_column("synonym", ColumnType::String)
            .with_nullable_column(CREATED_DATE, ColumnType::Timestamp),
        TableDefinition::new("Changes", TableKind::Metadata, "change_id")
            .with_column("user", ColumnType::String)
            .with_column("modified", ColumnType::Date)
            .with_column("reason", ColumnType::String)
            .with_nullable_column(CREATED_DATE, ColumnType::Timestamp),
        TableDefinition::new("Logs", TableKind::Metadata, "log_id")
            .with_column("table", ColumnType::String)
            .with_column("id", ColumnType::Uuid)
            .with_nullable_column("field", ColumnType::String)
            .with_nullable_column("new_value", ColumnType::String)
            .with_foreign_key("change_id", "Changes")
            .with_nullable_column(CREATED_DATE, ColumnType::Timestamp),
        TableDefinition::new("Extractions", TableKind::Metadata, "extraction_id")
            .with_column("table", ColumnType::String)
            .with_column("field", ColumnType::String)
            .with_column("chars", ColumnType::String)
            .with_foreign_key("datafile_id", "Datafiles")
            .with_nullable_column(CREATED_DATE, ColumnType::Timestamp)
            .with_parent_column("datafile_id"),
        TableDefinition::new("Tasks", TableKind::Metadata, "task_id")
            .with_nullable_foreign_key("parent_id", "Tasks")
            .with_column("name", ColumnType::String)
            .with_column("start", ColumnType::Timestamp)
            .with_column("end", ColumnType::Timestamp)
            .with_nullable_column("environment", ColumnType::String)
            .with_nullable_column("location", ColumnType::String)
            .with_foreign_key("privacy_id", "Privacies")
            .with_nullable_column(CREATED_DATE, ColumnType::Timestamp),
        TableDefinition::new("Participants", TableKind::Metadata, "participant_id")
            .with_foreign_key("platform_id", "Platforms")
            .with_foreign_key("task_id", "Tasks")
            .with_nullable_column("start", ColumnType::Timestamp)
            .with_nullable_column("end", ColumnType::Timestamp)
            .with_nullable_column("force", ColumnType::String)
            .with_foreign_key("privacy_id", "Privacies")
            .with_nullable_column(CREATED_DATE, ColumnType::Timestamp),
    ]
}

fn measurement(name: &str, primary_key: &str) -> TableDefinition {
    TableDefinition::new(name, TableKind::Measurement, primary_key)
        .with_foreign_key(PARENT_COLUMN, "Datafiles")
        .with_nullable_foreign_key("privacy_id", "Privacies")
        .with_nullable_column(CREATED_DATE, ColumnType::Timestamp)
        .with_parent_column(PARENT_COLUMN)
}

fn measurement_tables() -> Vec<TableDefinition> {
    vec![
        measurement("States", "state_id")
            .with_column("time", ColumnType::Timestamp)
            .with_foreign_key("sensor_id", "Sensors")
            .with_nullable_column("location", ColumnType::Geometry)
            .with_nullable_column("elevation", ColumnType::F64)
            .with_nullable_column("heading", ColumnType::F64)
            .with_nullable_column("course", ColumnType::F64)
            .with_nullable_column("speed", ColumnType::F64),
        measurement("Contacts", "contact_id")
            .with_nullable_column("name", ColumnType::String)
            .with_foreign_key("sensor_id", "Sensors")
            .with_column("time", ColumnType::Timestamp)
            .with_nullable_column("bearing", ColumnType::F64)
            .with_nullable_column("rel_bearing", ColumnType::F64)
            .with_nullable_column("freq", ColumnType::F64)
            .with_nullable_column("location", ColumnType::Geometry)
            .with_nullable_column("classification", ColumnType::String)
            .with_nullable_foreign_key("subject_id", "Platforms"),
        measurement("Activations", "activation_id")
            .with_column("name", ColumnType::String)
            .with_foreign_key("sensor_id", "Sensors")
            .with_nullable_column("start", ColumnType::Timestamp)
            .with_nullable_column("end", ColumnType::Timestamp)
            .with_nullable_column("min_range", ColumnType::F64)
            .with_nullable_column("max_range", ColumnType::F64)
            .with_nullable_column("left_arc", ColumnType::F64)
            .with_nullable_column("right_arc", ColumnType::F64),
        measurement("LogsHoldings", "logs_holding_id")
            .with_column("time", ColumnType::Timestamp)
            .with_column("quantity", ColumnType::F64)
            .with_foreign_key("unit_type_id", "UnitTypes")
            .with_foreign_key("platform_id", "Platforms")
            .with_column("comment", ColumnType::String),
        measurement("Comments", "comment_id")
            .with_nullable_foreign_key("platform_id", "Platforms")
            .with_column("time", ColumnType::Timestamp)
            .with_foreign_key("comment_type_id", "CommentTypes")
            .with_column("content", ColumnType::String),
        measurement("Geometries", "geometry_id")
            .with_column("geometry", ColumnType::Geometry)
            .with_column("name", ColumnType::String)
            .with_foreign_key("geo_type_id", "GeometryTypes")
            .with_foreign_key("geo_sub_type_id", "GeometrySubTypes")
            .with_nullable_foreign_key("subject_platform_id", "Platforms")
            .with_nullable_foreign_key("sensor_platform_id", "Platforms")
            .with_nullable_foreign_key("task_id", "Tasks")
            .with_nullable_column("start", ColumnType::Timestamp)
            .with_nullable_column("end", ColumnType::Timestamp),
        measurement("Media", "media_id")
            .with_nullable_foreign_key("platform_id", "Platforms")
            .with_nullable_foreign_key("subject_id", "Platforms")
            .with_nullable_foreign_key("sensor_id", "Sensors")
            .with_nullable_column("location", ColumnType::Geometry)
            .with_nullable_column("time", ColumnType::Timestamp)
            .with_foreign_key("media_type_id", "MediaTypes")
            .with_column("url", ColumnType::String),
    ]
}
