use chrono::{DateTime, TimeZone, Utc};

use super::aggregate::Order;
use super::value_objects::{Customer, DeliveryAddress, Marketplace, OrderId, OrderItem, OrderStatus, Restaurant};

// ============================================================================
// Sample Orders
// ============================================================================
//
// Static collection served by the in-memory source when no remote order API
// is configured. Covers every status and marketplace.
//
// ============================================================================

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

fn item(name: &str, quantity: i32, price: f64, description: &str) -> OrderItem {
    OrderItem {
        name: name.to_string(),
        quantity,
        price,
        description: Some(description.to_string()),
        observations: None,
    }
}

fn customer(name: &str, email: &str, phone: &str) -> Customer {
    Customer {
        name: name.to_string(),
        email: email.to_string(),
        phone: Some(phone.to_string()),
        address: None,
    }
}

fn address(street: &str, city: &str, state: &str, zip_code: &str) -> DeliveryAddress {
    DeliveryAddress {
        street: street.to_string(),
        city: city.to_string(),
        state: state.to_string(),
        zip_code: zip_code.to_string(),
        complement: None,
        reference: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn order(
    id: &str,
    order_number: &str,
    marketplace: Marketplace,
    status: OrderStatus,
    customer: Customer,
    items: Vec<OrderItem>,
    delivery_address: DeliveryAddress,
    payment_method: &str,
    placed_at: (u32, u32),
    delivery_fee: f64,
    restaurant: &str,
) -> Order {
    let total = items.iter().map(OrderItem::line_total).sum();
    let order_date = at(placed_at.0, placed_at.1);

    Order {
        id: OrderId::new(id),
        order_number: order_number.to_string(),
        marketplace,
        status,
        customer,
        items,
        delivery_address,
        payment_method: payment_method.to_string(),
        order_date,
        estimated_delivery: order_date + chrono::Duration::minutes(45),
        delivery_fee,
        notes: None,
        restaurant: Restaurant {
            name: restaurant.to_string(),
            phone: None,
        },
        total,
        delivered_at: (status == OrderStatus::Delivered).then(|| order_date + chrono::Duration::minutes(40)),
    }
}

/// The seed collection
pub fn seed_orders() -> Vec<Order> {
    vec![
        order(
            "1",
            "RPP-2024-001",
            Marketplace::Rappi,
            OrderStatus::Confirmed,
            Customer {
                address: Some("Rua das Flores, 123 - Apto 45".to_string()),
                ..customer("João Silva", "joao.silva@email.com", "(11) 99999-9999")
            },
            vec![
                OrderItem {
                    observations: Some("Sem cebola".to_string()),
                    ..item("Big Mac + Batata Grande + Coca 500ml", 1, 32.90, "Combo Big Mac completo")
                },
                item("McFlurry Ovomaltine", 1, 13.00, "Sobremesa gelada"),
            ],
            DeliveryAddress {
                complement: Some("Apto 45".to_string()),
                reference: Some("Próximo ao mercado".to_string()),
                ..address("Rua das Flores, 123", "São Paulo", "SP", "01234-567")
            },
            "PIX",
            (10, 30),
            5.90,
            "McDonald's - Shopping Center",
        ),
        order(
            "2",
            "IF-2024-002",
            Marketplace::Ifood,
            OrderStatus::Confirmed,
            customer("Maria Santos", "maria.santos@email.com", "(21) 88888-8888"),
            vec![
                item("Pizza Margherita Grande", 1, 52.90, "Pizza tradicional com manjericão"),
                item("Refrigerante 2L", 2, 7.45, "Coca-Cola 2 litros"),
            ],
            address("Av. Copacabana, 456", "Rio de Janeiro", "RJ", "22070-001"),
            "Cartão de Crédito",
            (11, 0),
            6.50,
            "Pizzaria Bella Napoli",
        ),
        order(
            "3",
            "99F-2024-003",
            Marketplace::NinetyNineFood,
            OrderStatus::Preparing,
            customer("Carlos Oliveira", "carlos.oliveira@email.com", "(31) 77777-7777"),
            vec![
                item("Hambúrguer Artesanal", 1, 28.90, "Blend 180g com queijo"),
                item("Batata Rústica", 1, 9.60, "Porção média"),
            ],
            address("Rua da Bahia, 789", "Belo Horizonte", "MG", "30160-011"),
            "Dinheiro",
            (11, 20),
            4.00,
            "Burger House",
        ),
        order(
            "4",
            "RPP-2024-004",
            Marketplace::Rappi,
            OrderStatus::Delivered,
            customer("Ana Costa", "ana.costa@email.com", "(41) 66666-6666"),
            vec![
                item("Combo Sushi 20 peças", 1, 65.90, "Seleção do chef"),
                item("Temaki Salmão", 1, 6.50, "Temaki tradicional"),
            ],
            address("Rua XV de Novembro, 1000", "Curitiba", "PR", "80020-310"),
            "Cartão de Débito",
            (9, 45),
            7.00,
            "Sushi Zen",
        ),
        order(
            "5",
            "IF-2024-005",
            Marketplace::Ifood,
            OrderStatus::Cancelled,
            customer("Pedro Ferreira", "pedro.ferreira@email.com", "(85) 55555-5555"),
            vec![
                item("Açaí 500ml", 1, 18.90, "Açaí com granola e banana"),
                item("Água 500ml", 1, 3.00, "Água mineral sem gás"),
            ],
            address("Av. Beira Mar, 2000", "Fortaleza", "CE", "60165-121"),
            "PIX",
            (12, 10),
            8.00,
            "Açaí do Ceará",
        ),
        order(
            "6",
            "IF-2024-006",
            Marketplace::Ifood,
            OrderStatus::Shipped,
            customer("Lucas Almeida", "lucas.almeida@email.com", "(85) 44444-4444"),
            vec![item("Açaí 700ml", 2, 24.90, "Açaí com leite ninho")],
            address("Rua Tibúrcio Cavalcante, 300", "Fortaleza", "CE", "60125-100"),
            "Cartão de Crédito",
            (12, 40),
            8.00,
            "Açaí do Ceará",
        ),
        order(
            "7",
            "KTA-2024-007",
            Marketplace::Keeta,
            OrderStatus::Pending,
            customer("Beatriz Rocha", "beatriz.rocha@email.com", "(11) 33333-3333"),
            vec![
                item("Yakisoba Tradicional", 1, 34.90, "Massa com legumes e carne"),
                item("Guioza (6 un.)", 1, 16.00, "Recheio de porco"),
            ],
            address("Rua Galvão Bueno, 50", "São Paulo", "SP", "01506-000"),
            "PIX",
            (13, 5),
            5.00,
            "Liberdade Express",
        ),
    ]
}

/// A single order with the given id and status
pub fn sample_order(id: &str, status: OrderStatus) -> Order {
    let mut order = seed_orders().remove(0);
    order.id = OrderId::new(id);
    order.status = status;
    order.delivered_at = None;
    order
}
