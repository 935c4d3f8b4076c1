use chrono::Utc;
use maniocagri_api::{
    config::AppConfig,
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Role},
    },
    security::hash_password,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

const DEMO_PASSWORD: &str = "pass";

const USERS: [(&str, &str, Role); 7] = [
    ("admin", "admin@maniocagri.com", Role::Admin),
    ("producteur1", "producteur1@maniocagri.com", Role::Producer),
    ("agent1", "agent1@maniocagri.com", Role::FieldAgent),
    ("livreur1", "livreur1@maniocagri.com", Role::DeliveryPerson),
    ("client1", "client1@maniocagri.com", Role::Client),
    ("client2", "client2@maniocagri.com", Role::Client),
    ("gestionnaire1", "gestionnaire1@maniocagri.com", Role::Manager),
];

// name, description, price, stock, image
const PRODUCTS: [(&str, &str, i64, i32, &str); 5] = [
    (
        "Farine de Manioc Séché",
        "Farine fine obtenue à partir de manioc séché au soleil.",
        500,
        100,
        "images/products/farine-seche.jpg",
    ),
    (
        "Farine de Manioc Humide",
        "Pâte de manioc fraîche pour foufou et placali.",
        450,
        50,
        "images/products/farine-humide.jpg",
    ),
    (
        "Gari",
        "Semoule de manioc fermentée et torréfiée.",
        600,
        200,
        "images/products/gari.jpg",
    ),
    (
        "Tapioca",
        "Perles de tapioca pour desserts et bouillies.",
        800,
        30,
        "images/products/tapioca.jpg",
    ),
    (
        "Attiéké",
        "Couscous de manioc fermenté, cuit à la vapeur.",
        700,
        40,
        "images/products/attieke.jpg",
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let mut producer_id = None;
    for (username, email, role) in USERS {
        let id = ensure_user(&orm, username, email, role).await?;
        if role == Role::Producer {
            producer_id = Some(id);
        }
    }
    seed_products(&orm, producer_id).await?;

    println!("Seed completed. Demo accounts use the password `{DEMO_PASSWORD}`");
    Ok(())
}

async fn ensure_user(orm: &OrmConn, username: &str, email: &str, role: Role) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Username.eq(username))
        .one(orm)
        .await?
    {
        println!("User {username} already present");
        return Ok(existing.id);
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(DEMO_PASSWORD)?),
        role: Set(role),
        is_active: Set(true),
        is_approved: Set(true),
        first_name: Set(None),
        last_name: Set(None),
        phone: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;

    println!("Ensured user {username} (role={role:?})");
    Ok(user.id)
}

async fn seed_products(orm: &OrmConn, producer_id: Option<Uuid>) -> anyhow::Result<()> {
    for (name, description, price, stock, image) in PRODUCTS {
        let exists = Products::find()
            .filter(ProdCol::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            price: Set(price),
            stock_quantity: Set(stock),
            image_url: Set(Some(image.to_string())),
            producer_id: Set(producer_id),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
        println!("Seeded product {name}");
    }
    Ok(())
}
