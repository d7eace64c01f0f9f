use rand::Rng;
use rand::seq::SliceRandom;

use crate::database::DbPool;
use crate::models::user::NewUser;
use crate::services::bulk_loader::{BulkLoadReport, bulk_create};

const FIRST_NAMES: &[&str] = &[
    "Ivan", "Petr", "Anna", "Maria", "Olga", "Sergey", "Dmitry", "Elena", "Nikolai", "Tatiana",
    "Alexei", "Irina", "Pavel", "Svetlana", "Mikhail", "Natalia", "Andrei", "Yulia", "Oleg",
    "Vera",
];

const LAST_NAMES: &[&str] = &[
    "Ivanov", "Petrov", "Sidorov", "Smirnov", "Kuznetsov", "Popov", "Vasiliev", "Sokolov",
    "Mikhailov", "Novikov", "Fedorov", "Morozov", "Volkov", "Alekseev", "Lebedev", "Semenov",
    "Egorov", "Pavlov", "Kozlov", "Stepanov",
];

fn random_name<R: Rng>(rng: &mut R) -> (&'static str, &'static str) {
    let name = FIRST_NAMES.choose(rng).copied().unwrap_or("Ivan");
    let last_name = LAST_NAMES.choose(rng).copied().unwrap_or("Ivanov");
    (name, last_name)
}

/// `count` users with logins `login1..=loginN` and random names.
pub fn generate_fake_users(count: usize) -> Vec<NewUser> {
    let mut rng = rand::thread_rng();
    (1..=count)
        .map(|i| {
            let (name, last_name) = random_name(&mut rng);
            NewUser::new(format!("login{}", i), name, last_name)
                .with_description(format!("description {} {}", name, last_name))
        })
        .collect()
}

pub async fn seed_fake_users(db: &DbPool, count: usize) -> BulkLoadReport {
    tracing::info!("Generating {} fake users", count);
    let users = generate_fake_users(count);
    tracing::info!("Generation finished, saving");

    let report = bulk_create(db, &users).await;

    let failed = report.failed_batches().count();
    if failed > 0 {
        tracing::warn!(
            "Fake user seeding saved {} of {} users ({} batches failed)",
            report.inserted(),
            count,
            failed
        );
    } else {
        tracing::info!("Fake user seeding saved {} users", report.inserted());
    }

    report
}
