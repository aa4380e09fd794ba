use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

fn cascade_fk(
    name: &str,
    from_table: &'static str,
    from_col: &'static str,
    to_table: &'static str,
) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(from_table, from_col)
        .to(to_table, "id")
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table("hosts")
                    .if_not_exists()
                    .col(pk_auto("id"))
                    .col(string("name"))
                    .col(string("email"))
                    .col(string("phone_number"))
                    .col(string("password_hash"))
                    .col(string("division"))
                    .col(string("district"))
                    .col(string("upazila_thana"))
                    .col(string("address"))
                    .col(string_null("image_url"))
                    .col(string_len("verification", 32).default("unverified"))
                    .col(timestamp("created_at"))
                    .index(
                        Index::create()
                            .name("idx-hosts-email")
                            .col("email")
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("users")
                    .if_not_exists()
                    .col(pk_auto("id"))
                    .col(string("name"))
                    .col(string("email"))
                    .col(string("password_hash"))
                    .col(string("phone_number"))
                    .col(string_null("image_url"))
                    .col(timestamp("created_at"))
                    .index(
                        Index::create()
                            .name("idx-users-email")
                            .col("email")
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("events")
                    .if_not_exists()
                    .col(pk_auto("id"))
                    .col(integer("host_id"))
                    .col(string("title"))
                    .col(string_null("banner_url"))
                    .col(string("location"))
                    .col(text_null("description"))
                    .col(date("event_date"))
                    .col(string("event_time"))
                    .col(double("price"))
                    .col(integer("total_seat"))
                    .col(integer("filled_seat").default(0))
                    .col(string("category"))
                    .col(string_len("approval_status", 32).default("pending"))
                    .col(timestamp("created_at"))
                    .foreign_key(&mut cascade_fk(
                        "fk-events-host_id",
                        "events",
                        "host_id",
                        "hosts",
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("participants")
                    .if_not_exists()
                    .col(pk_auto("id"))
                    .col(integer("host_id"))
                    .col(integer("event_id"))
                    .col(integer("user_id"))
                    .col(integer("total_booked"))
                    .col(double("payment"))
                    .col(double("due").default(0.0))
                    .col(timestamp_null("payment_date"))
                    .foreign_key(&mut cascade_fk(
                        "fk-participants-host_id",
                        "participants",
                        "host_id",
                        "hosts",
                    ))
                    .foreign_key(&mut cascade_fk(
                        "fk-participants-event_id",
                        "participants",
                        "event_id",
                        "events",
                    ))
                    .foreign_key(&mut cascade_fk(
                        "fk-participants-user_id",
                        "participants",
                        "user_id",
                        "users",
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("tickets")
                    .if_not_exists()
                    .col(pk_auto("id"))
                    .col(integer("host_id"))
                    .col(integer("event_id"))
                    .col(integer("user_id"))
                    .col(integer("participant_id"))
                    .col(string("ticket_code"))
                    .col(string("user_email"))
                    .col(string("user_name"))
                    .col(text("payload"))
                    .col(text("qr_image"))
                    .col(string_len("state", 32).default("unverified"))
                    .col(timestamp("created_at"))
                    .col(timestamp_null("scanned_at"))
                    .foreign_key(&mut cascade_fk(
                        "fk-tickets-host_id",
                        "tickets",
                        "host_id",
                        "hosts",
                    ))
                    .foreign_key(&mut cascade_fk(
                        "fk-tickets-event_id",
                        "tickets",
                        "event_id",
                        "events",
                    ))
                    .foreign_key(&mut cascade_fk(
                        "fk-tickets-user_id",
                        "tickets",
                        "user_id",
                        "users",
                    ))
                    .foreign_key(&mut cascade_fk(
                        "fk-tickets-participant_id",
                        "tickets",
                        "participant_id",
                        "participants",
                    ))
                    .index(
                        Index::create()
                            .name("idx-tickets-ticket_code")
                            .col("ticket_code")
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("otp_records")
                    .if_not_exists()
                    .col(pk_auto("id"))
                    .col(integer("owner_id"))
                    .col(string_len("owner_type", 16))
                    .col(string_len("purpose", 32))
                    .col(string("otp"))
                    .col(timestamp("expires_at"))
                    .col(timestamp("created_at"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-otp_records-owner")
                    .table("otp_records")
                    .col("owner_id")
                    .col("owner_type")
                    .col("purpose")
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in ["otp_records", "tickets", "participants", "events", "users", "hosts"] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }

        Ok(())
    }
}
