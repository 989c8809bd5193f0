//! Migration: Create test_result_containers table and shared trigger function.
//!
//! A container is one executed test-suite run (or one test class inside it)
//! with its aggregated counters, scores and artifact references.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                -- Shared trigger function for updated_at
                CREATE OR REPLACE FUNCTION update_updated_at_column()
                RETURNS TRIGGER AS $$
                BEGIN
                    NEW.updated_at = GREATEST(NEW.updated_at, clock_timestamp());
                    RETURN NEW;
                END;
                $$ LANGUAGE plpgsql;

                CREATE TABLE test_result_containers (
                    id UUID PRIMARY KEY, -- UUIDv7 for time-ordered sorting

                    -- Nesting (TestClasses): children point at their parent
                    parent_id UUID REFERENCES test_result_containers(id) ON DELETE CASCADE,
                    position INTEGER NOT NULL DEFAULT 0 CHECK (position >= 0),

                    -- Identification
                    identifier VARCHAR(1000) NOT NULL CHECK (identifier <> ''),
                    short_identifier VARCHAR(255),
                    display_name VARCHAR(1000),

                    -- Artifact store references (opaque ids, no foreign key)
                    pcap_storage_id UUID,
                    keylogfile_storage_id UUID,

                    -- Timing
                    date TIMESTAMPTZ,
                    elapsed_time DOUBLE PRECISION,

                    -- Counters
                    failed_tests INTEGER NOT NULL DEFAULT 0 CHECK (failed_tests >= 0),
                    succeeded_tests INTEGER NOT NULL DEFAULT 0 CHECK (succeeded_tests >= 0),
                    disabled_tests INTEGER NOT NULL DEFAULT 0 CHECK (disabled_tests >= 0),

                    -- Score.Security
                    security_reached INTEGER NOT NULL DEFAULT 0 CHECK (security_reached >= 0),
                    security_total INTEGER NOT NULL DEFAULT 0 CHECK (security_total >= 0),
                    security_percentage DOUBLE PRECISION NOT NULL DEFAULT 0,

                    -- Score.Interoperability
                    interoperability_reached INTEGER NOT NULL DEFAULT 0
                        CHECK (interoperability_reached >= 0),
                    interoperability_total INTEGER NOT NULL DEFAULT 0
                        CHECK (interoperability_total >= 0),
                    interoperability_percentage DOUBLE PRECISION NOT NULL DEFAULT 0,

                    -- Weak references to test result records, in order
                    test_results JSONB NOT NULL DEFAULT '[]'::jsonb
                        CHECK (jsonb_typeof(test_results) = 'array'),
                    -- "Class.method" -> index into test_results
                    test_result_class_method_index_map JSONB NOT NULL DEFAULT '{}'::jsonb
                        CHECK (jsonb_typeof(test_result_class_method_index_map) = 'object'),

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Lookup indexes
                CREATE INDEX idx_test_result_containers_identifier
                    ON test_result_containers(identifier);
                CREATE INDEX idx_test_result_containers_pcap_storage_id
                    ON test_result_containers(pcap_storage_id)
                    WHERE pcap_storage_id IS NOT NULL;
                CREATE INDEX idx_test_result_containers_keylogfile_storage_id
                    ON test_result_containers(keylogfile_storage_id)
                    WHERE keylogfile_storage_id IS NOT NULL;

                -- Index for loading children in order
                CREATE INDEX idx_test_result_containers_parent_id
                    ON test_result_containers(parent_id, position)
                    WHERE parent_id IS NOT NULL;

                -- Index for listing top-level containers by creation date
                CREATE INDEX idx_test_result_containers_created_at
                    ON test_result_containers(created_at DESC)
                    WHERE parent_id IS NULL;

                -- Trigger to update updated_at
                CREATE TRIGGER update_test_result_containers_updated_at
                    BEFORE UPDATE ON test_result_containers
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TRIGGER IF EXISTS update_test_result_containers_updated_at ON test_result_containers;
                DROP TABLE IF EXISTS test_result_containers CASCADE;
                DROP FUNCTION IF EXISTS update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }
}
