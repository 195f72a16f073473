//! MQTT transport running as its own task.
//!
//! The TCP socket and the MQTT client borrow stack-local buffers, so they
//! live inside the task loop for the duration of one session epoch. The
//! coordinator talks to the task through static channels: a connect
//! request/result signal pair, a bounded outbound request queue and a
//! bounded inbound message queue.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::select::{select3, Either3};
use embassy_net::{dns::DnsQueryType, tcp::TcpSocket, Stack};
use embassy_time::{with_timeout, Duration, Ticker};
use heapless::{String, Vec};
use log::{debug, info, warn};
use rust_mqtt::{
    client::{client::MqttClient, client_config::ClientConfig},
    packet::v5::publish_packet::QualityOfService,
    utils::rng_generator::CountingRng,
};

use node_core::payload::RECORD_MAX;
use node_core::session::{Credentials, MessageTransport, SessionError, BROKER_HOST_MAX};
use node_core::topics::TOPIC_MAX;

use crate::constants::{
    MQTT_BUFFER_SIZE, MQTT_CONNECT_TIMEOUT_SECS, MQTT_KEEP_ALIVE_SECS, MQTT_PING_INTERVAL_SECS,
    MQTT_TCP_BUFFER_SIZE,
};

const CLIENT_ID_MAX: usize = 32;
const USERNAME_MAX: usize = 32;
const PASSWORD_MAX: usize = 64;
const INBOUND_PAYLOAD_MAX: usize = 256;

struct ConnectRequest {
    host: String<BROKER_HOST_MAX>,
    port: u16,
    client_id: String<CLIENT_ID_MAX>,
    username: String<USERNAME_MAX>,
    password: String<PASSWORD_MAX>,
    authenticate: bool,
}

enum Request {
    Publish {
        topic: String<TOPIC_MAX>,
        payload: Vec<u8, RECORD_MAX>,
    },
    Subscribe {
        topic: String<TOPIC_MAX>,
    },
}

struct InboundMessage {
    topic: String<TOPIC_MAX>,
    payload: Vec<u8, INBOUND_PAYLOAD_MAX>,
}

type RawMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

static CONNECT_REQUEST: embassy_sync::signal::Signal<RawMutex, ConnectRequest> =
    embassy_sync::signal::Signal::new();
static CONNECT_RESULT: embassy_sync::signal::Signal<RawMutex, Result<(), SessionError>> =
    embassy_sync::signal::Signal::new();
static REQUESTS: embassy_sync::channel::Channel<RawMutex, Request, 8> =
    embassy_sync::channel::Channel::new();
static INBOUND: embassy_sync::channel::Channel<RawMutex, InboundMessage, 4> =
    embassy_sync::channel::Channel::new();
static SESSION_UP: AtomicBool = AtomicBool::new(false);

/// Coordinator-side handle. All calls are relayed to [`session_task`].
pub struct SessionHandle;

impl MessageTransport for SessionHandle {
    async fn connect(
        &mut self,
        host: &str,
        port: u16,
        client_id: &str,
        credentials: Option<Credentials<'_>>,
    ) -> Result<(), SessionError> {
        let mut request = ConnectRequest {
            host: String::new(),
            port,
            client_id: String::new(),
            username: String::new(),
            password: String::new(),
            authenticate: credentials.is_some(),
        };
        request
            .host
            .push_str(host)
            .map_err(|_| SessionError::BrokerRejected)?;
        request
            .client_id
            .push_str(client_id)
            .map_err(|_| SessionError::BrokerRejected)?;
        if let Some((username, password)) = credentials {
            request
                .username
                .push_str(username)
                .map_err(|_| SessionError::BrokerRejected)?;
            request
                .password
                .push_str(password)
                .map_err(|_| SessionError::BrokerRejected)?;
        }

        CONNECT_RESULT.reset();
        CONNECT_REQUEST.signal(request);
        CONNECT_RESULT.wait().await
    }

    fn is_connected(&self) -> bool {
        SESSION_UP.load(Ordering::Acquire)
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        let mut request_topic = String::new();
        request_topic
            .push_str(topic)
            .map_err(|_| SessionError::BrokerRejected)?;
        let request_payload =
            Vec::from_slice(payload).map_err(|_| SessionError::BrokerRejected)?;
        if REQUESTS
            .try_send(Request::Publish {
                topic: request_topic,
                payload: request_payload,
            })
            .is_err()
        {
            // Queue full: the message is dropped, matching the at-most-once
            // delivery contract of the publish path.
            warn!("mqtt: outbound queue full, dropping message for {}", topic);
        }
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        let mut request_topic = String::new();
        request_topic
            .push_str(topic)
            .map_err(|_| SessionError::BrokerRejected)?;
        REQUESTS
            .try_send(Request::Subscribe {
                topic: request_topic,
            })
            .map_err(|_| SessionError::BrokerRejected)
    }

    async fn drain(&mut self, handler: &mut dyn FnMut(&str, &[u8])) {
        while let Ok(message) = INBOUND.try_receive() {
            handler(&message.topic, &message.payload);
        }
    }
}

/// Owns the broker connection. Each loop iteration is one session epoch:
/// wait for a connect request, establish TCP and the MQTT session, then
/// serve publishes, subscribes, inbound traffic and keep-alive pings until
/// something fails.
#[embassy_executor::task]
pub async fn session_task(stack: Stack<'static>) {
    loop {
        let request = CONNECT_REQUEST.wait().await;
        SESSION_UP.store(false, Ordering::Release);

        let address = match stack.dns_query(&request.host, DnsQueryType::A).await {
            Ok(addresses) if !addresses.is_empty() => addresses[0],
            Ok(_) => {
                warn!("mqtt: no DNS record for {}", request.host);
                CONNECT_RESULT.signal(Err(SessionError::BrokerRejected));
                continue;
            }
            Err(e) => {
                warn!("mqtt: DNS lookup for {} failed: {:?}", request.host, e);
                CONNECT_RESULT.signal(Err(SessionError::BrokerRejected));
                continue;
            }
        };

        let mut rx_buffer = [0; MQTT_TCP_BUFFER_SIZE];
        let mut tx_buffer = [0; MQTT_TCP_BUFFER_SIZE];
        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(Duration::from_secs(MQTT_KEEP_ALIVE_SECS as u64 * 2)));

        info!("mqtt: connecting to {}:{}", address, request.port);
        match with_timeout(
            Duration::from_secs(MQTT_CONNECT_TIMEOUT_SECS),
            socket.connect((address, request.port)),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("mqtt: TCP connect failed: {:?}", e);
                CONNECT_RESULT.signal(Err(SessionError::BrokerRejected));
                continue;
            }
            Err(_) => {
                warn!("mqtt: TCP connect timed out");
                CONNECT_RESULT.signal(Err(SessionError::BrokerRejected));
                continue;
            }
        }

        let mut config = ClientConfig::new(
            rust_mqtt::client::client_config::MqttVersion::MQTTv5,
            CountingRng(20000),
        );
        config.add_client_id(&request.client_id);
        if request.authenticate {
            config.add_username(&request.username);
            config.add_password(&request.password);
        }
        config.keep_alive = MQTT_KEEP_ALIVE_SECS;
        config.max_packet_size = MQTT_BUFFER_SIZE as u32;

        let mut recv_buffer = [0; MQTT_BUFFER_SIZE];
        let mut write_buffer = [0; MQTT_BUFFER_SIZE];
        let mut client = MqttClient::<_, 5, _>::new(
            socket,
            &mut write_buffer,
            MQTT_BUFFER_SIZE,
            &mut recv_buffer,
            MQTT_BUFFER_SIZE,
            config,
        );

        if let Err(code) = client.connect_to_broker().await {
            warn!("mqtt: broker rejected session: {:?}", code);
            CONNECT_RESULT.signal(Err(SessionError::BrokerRejected));
            continue;
        }

        info!("mqtt: session established");
        SESSION_UP.store(true, Ordering::Release);
        CONNECT_RESULT.signal(Ok(()));

        serve(&mut client).await;

        SESSION_UP.store(false, Ordering::Release);
        info!("mqtt: session closed");
    }
}

/// Runs one established session until an error ends it.
async fn serve<'a, T: embedded_io_async::Read + embedded_io_async::Write>(
    client: &mut MqttClient<'a, T, 5, CountingRng>,
) {
    let mut ping = Ticker::every(Duration::from_secs(MQTT_PING_INTERVAL_SECS));
    loop {
        let mut pending = None;
        let mut ping_due = false;
        match select3(REQUESTS.receive(), client.receive_message(), ping.next()).await {
            Either3::First(request) => pending = Some(request),
            Either3::Second(Ok((topic, payload))) => {
                let mut message = InboundMessage {
                    topic: String::new(),
                    payload: Vec::new(),
                };
                if message.topic.push_str(topic).is_err()
                    || message.payload.extend_from_slice(payload).is_err()
                {
                    warn!("mqtt: oversized inbound message on {}, dropping", topic);
                } else if INBOUND.try_send(message).is_err() {
                    warn!("mqtt: inbound queue full, dropping message");
                }
            }
            Either3::Second(Err(code)) => {
                warn!("mqtt: receive failed: {:?}", code);
                return;
            }
            Either3::Third(_) => ping_due = true,
        }

        if let Some(request) = pending {
            let result = match request {
                Request::Publish { topic, payload } => {
                    debug!("mqtt: publishing to {}", topic);
                    client
                        .send_message(&topic, &payload, QualityOfService::QoS0, false)
                        .await
                }
                Request::Subscribe { topic } => {
                    info!("mqtt: subscribing to {}", topic);
                    client.subscribe_to_topic(&topic).await
                }
            };
            if let Err(code) = result {
                warn!("mqtt: request failed: {:?}", code);
                return;
            }
        }

        if ping_due {
            if let Err(code) = client.send_ping().await {
                warn!("mqtt: ping failed: {:?}", code);
                return;
            }
        }
    }
}
